use clap::CommandFactory;
use finishit_core::{BreathingTechnique, Rank};

use crate::Cli;

pub fn ranks() -> Result<(), Box<dyn std::error::Error>> {
    for rank in Rank::LADDER {
        println!(
            "{:>5}  {} {}",
            rank.required_points(),
            rank.kanji(),
            rank.name()
        );
    }
    Ok(())
}

pub fn techniques() -> Result<(), Box<dyn std::error::Error>> {
    for technique in BreathingTechnique::ALL {
        let c = technique.cadence();
        println!(
            "{:<8} {} {:<18} in {} / hold {} / out {} ({:>2}s cycle)  {}",
            technique.key(),
            technique.kanji(),
            technique.name(),
            c.inhale,
            c.hold,
            c.exhale,
            c.cycle_secs(),
            technique.description()
        );
    }
    Ok(())
}

pub fn completions(shell: clap_complete::Shell) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
