use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod rules;
mod services;
mod utils;

use config::Config;
use rules::RuleStore;
use services::{
    create_caret_probe, create_focus_watcher, create_identity_source, create_switch_sink,
    create_window_enumerator, CaretLocator, Discovery, IndicatorScheduler, LogIndicatorView,
    SwitchEngine,
};

#[derive(Parser, Debug)]
#[command(name = "ims-rust")]
#[command(about = "Утилита для автоматического переключения раскладки клавиатуры")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "ims.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<RuleCommand>,
}

/// Разовые операции над правилами: выполняются и завершают процесс
#[derive(Subcommand, Debug)]
enum RuleCommand {
    /// Задать правило "идентификатор -> язык"
    Set { identity: String, language: String },
    /// Удалить правило для идентификатора
    Remove { identity: String },
    /// Задать язык по умолчанию
    SetDefault { language: String },
    /// Показать видимые окна и наличие правил для них
    Discover,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск IMS Rust v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    // Хранилище правил: рядом с исполняемым файлом, первый запуск без
    // файла оставляет пустой набор с языком по умолчанию из конфигурации
    let rules = Arc::new(RuleStore::new(
        config.rules_path(),
        config.switching.default_language.clone(),
    ));
    rules.load()?;

    // Разовая операция над правилами вместо режима демона
    if let Some(command) = args.command {
        return run_rule_command(command, rules, args.dry_run).await;
    }

    // Инициализация компонентов (все OS-швы создаются фабриками с учётом dry_run)
    let identity = create_identity_source(args.dry_run);
    let sink = create_switch_sink(config.clone(), args.dry_run)?;
    let caret_locator = CaretLocator::new(create_caret_probe(args.dry_run));
    let indicator = Arc::new(IndicatorScheduler::new(
        Arc::new(LogIndicatorView),
        tokio::time::Duration::from_millis(config.indicator.dwell_ms),
    ));

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = SwitchEngine::new(rules, identity, sink, caret_locator, indicator);
    let focus_watcher = create_focus_watcher(config.clone(), events_tx, args.dry_run)?;

    info!("Все компоненты инициализированы");

    // Запуск сервисов: наблюдатель фокуса пишет в канал, движок читает
    let engine_handle = tokio::spawn(async move {
        if let Err(e) = engine.run(events_rx).await {
            error!("Ошибка в SwitchEngine: {}", e);
        }
    });
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = focus_watcher.run().await {
            error!("Ошибка в FocusWatcher: {}", e);
        }
    });

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Прерываем задачи: наблюдатель перестаёт слать события, движок
    // дочитывает канал
    watcher_handle.abort();
    engine_handle.abort();

    // Ожидаем завершения задач (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = watcher_handle.await;
        let _ = engine_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("IMS Rust завершил работу");
    Ok(())
}

/// Выполнить разовую операцию над правилами.
///
/// Ошибка сохранения файла правил видима пользователю: она попадает в
/// вывод и в код завершения процесса.
async fn run_rule_command(command: RuleCommand, rules: Arc<RuleStore>, dry_run: bool) -> Result<()> {
    match command {
        RuleCommand::Set { identity, language } => {
            rules.set(&identity, &language)?;
            println!("Правило сохранено: {} -> {}", identity.to_lowercase(), language);
        }
        RuleCommand::Remove { identity } => {
            rules.remove(&identity)?;
            println!("Правило удалено: {}", identity.to_lowercase());
        }
        RuleCommand::SetDefault { language } => {
            rules.set_default(&language)?;
            println!("Язык по умолчанию: {}", language);
        }
        RuleCommand::Discover => {
            let discovery = Discovery::new(
                create_window_enumerator(dry_run),
                create_identity_source(dry_run),
                rules,
            );
            let apps = discovery.discover().await?;

            println!("--- Активные приложения ---");
            for app in &apps {
                match &app.language {
                    Some(language) => println!("  > {} {}", app.identity, language),
                    None => println!("  > {} (правила нет)", app.identity),
                }
            }
            println!("--- Конец списка ---");
        }
    }
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
