use std::path::Path;
use std::process;

use clap::Parser;
use tracing::error;

use shortener::cli::{Cli, Commands, ConfigCommands};
use shortener::config::StaticConfig;
use shortener::errors::ShortenerError;
use shortener::runtime::{build_repository, run_server};
use shortener::system::init_logging;

fn generate_config(output_path: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());
    if Path::new(&path).exists() && !force {
        anyhow::bail!("{} already exists, use --force to overwrite", path);
    }

    StaticConfig::default()
        .save_to_file(&path)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path, e))?;
    println!("Sample configuration written to {}", path);
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    }) = &cli.command
    {
        return generate_config(output_path.clone(), *force);
    }

    // 日志尚未初始化，配置错误只能直接打印
    let mut config = match StaticConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let err = ShortenerError::initialization(format!("invalid configuration: {}", e));
            eprintln!("{}", err.format_colored());
            process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    let guard = init_logging(&config.logging)?;

    let repo = match build_repository(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            error!("Storage initialization failed: {}", e);
            drop(guard);
            process::exit(1);
        }
    };

    let result = run_server(config, repo).await;
    drop(guard);
    result
}
