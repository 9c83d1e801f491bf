use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "lesson-gate")]
#[command(about = "Course progression and verification gate for audio microlearning")]
pub struct CliConfig {
    /// Path to TOML configuration file (optional, defaults apply when absent)
    #[arg(short, long, env = "LESSON_GATE_CONFIG")]
    pub config: Option<String>,

    /// Override storage.data_dir from the config file
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Set up modules and the initial lock state of a course
    Enroll {
        #[arg(long)]
        course: String,
        /// Discard existing progress
        #[arg(long)]
        reset: bool,
    },
    /// Mark a lesson as finished and unlock what follows
    Complete {
        #[arg(long)]
        course: String,
        #[arg(long)]
        lesson: String,
    },
    /// Show progress for a course
    Status {
        #[arg(long)]
        course: String,
    },
    /// Run the debounced verification check for a subject
    Verify {
        #[arg(long)]
        subject: String,
        /// Number of back-to-back checks to issue
        #[arg(long, default_value = "1")]
        repeat: usize,
    },
}
