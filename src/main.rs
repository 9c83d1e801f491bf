use clap::Parser;
use lesson_gate::config::Command;
use lesson_gate::utils::error::ErrorSeverity;
use lesson_gate::utils::{logger, validation::Validate};
use lesson_gate::{
    CliConfig, DebouncedCheck, LocalCourseStore, ProgressEngine, ProgressError, RemoteVerifier,
    TomlConfig, TracingNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let mut config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => TomlConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(command: Command, config: &TomlConfig) -> Result<(), ProgressError> {
    let store = LocalCourseStore::new(&config.storage.data_dir);
    let engine = ProgressEngine::with_policy(store, TracingNotifier, config.policy());

    match command {
        Command::Enroll { course, reset } => {
            let course = engine.enroll(&course, reset).await?;
            println!(
                "✅ Enrolled in '{}': {} lessons in {} modules",
                course.title,
                course.lessons.len(),
                course.modules.len()
            );
        }
        Command::Complete { course, lesson } => {
            let outcome = engine.complete_lesson(&course, &lesson).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Status { course } => {
            let progress = engine.status(&course).await?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        Command::Verify { subject, repeat } => {
            let verifier = RemoteVerifier::new(&config.backend, &config.verification)?;
            let checker = DebouncedCheck::with_timings(verifier, config.timings());

            for attempt in 1..=repeat.max(1) {
                let verified = checker.check(&subject).await;
                println!("#{} {}: verified={}", attempt, subject, verified);
            }
            println!("🔍 Remote lookups issued: {}", checker.remote_calls());
            checker.dispose();
        }
    }

    Ok(())
}
