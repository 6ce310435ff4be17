use crate::demo::DemoProgram;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use ifds_ide::data_flow::ifdside::{SolverConfig, WorklistOrder};
use log::LevelFilter;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Analysis {
    /// IFDS: variables read before being assigned
    Uninit,
    /// IDE: linear constant propagation
    Lca,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Order {
    Fifo,
    Lifo,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineArgs {
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(short, long)]
    pub quiet: bool,

    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Analysis::Lca)]
    pub analysis: Analysis,

    #[arg(short, long, value_enum, default_value_t = DemoProgram::Calls)]
    pub demo: DemoProgram,

    #[arg(long, value_enum, default_value_t = Order::Fifo)]
    pub worklist: Order,

    #[arg(long)]
    pub max_iterations: Option<u64>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Probe every join for monotonicity (slow)
    #[arg(long)]
    pub check_monotonicity: bool,

    /// Also report uninitialized call arguments (uninit analysis only)
    #[arg(long)]
    pub check_actual_parameters: bool,

    /// Print the exploded supergraph edges produced while solving
    #[arg(long)]
    pub print_esg: bool,
}

impl CommandLineArgs {
    fn get_log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Off;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn init_logger(&self) -> anyhow::Result<()> {
        use simplelog::*;
        let log_level = self.get_log_level();
        if let Some(log_file) = &self.log_file {
            let file = File::create(log_file)
                .with_context(|| format!("cannot create log file {}", log_file.display()))?;
            CombinedLogger::init(vec![
                TermLogger::new(log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
                WriteLogger::new(LevelFilter::Info, Config::default(), file),
            ])?;
        } else {
            TermLogger::init(log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;
        }
        Ok(())
    }

    pub fn solver_config(&self) -> SolverConfig {
        let order = match self.worklist {
            Order::Fifo => WorklistOrder::Fifo,
            Order::Lifo => WorklistOrder::Lifo,
        };
        let mut config = SolverConfig::default()
            .with_worklist_order(order)
            .with_monotonicity_check(self.check_monotonicity)
            .with_esg_recording(self.print_esg)
            .with_compute_values(self.analysis == Analysis::Lca);
        if let Some(max_iterations) = self.max_iterations {
            config = config.with_max_iterations(max_iterations);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        config
    }
}
