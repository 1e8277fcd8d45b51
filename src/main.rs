//! Open Library 图书检索终端客户端。
//!
//! 本 crate 负责：配置加载、交互界面（TUI/CLI）、远端目录搜索、详情投影与封面确认。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志等基础设施
//! - `catalog`：搜索客户端、结果投影、详情选择与会话状态机
//! - `ui`：TUI 与无 UI（old cli）两套交互

use anyhow::{Result, anyhow};
use clap::Parser;

mod base_system;
mod catalog;
mod ui;

use base_system::config::{load_or_create, load_or_create_with_base};
use base_system::context::Config;
use base_system::logging::{LogOptions, LogSystem};
use tracing::info;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "openlib-explorer")]
#[command(about = "Open Library catalog explorer (Rust TUI)")]
struct Cli {
    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 显示版本信息后退出
    #[arg(long, default_value_t = false)]
    version: bool,

    /// 强制使用无 UI 模式（覆盖配置文件）
    #[arg(long, default_value_t = false)]
    old_cli: bool,

    /// 数据目录路径（用于存放 config.yml 和 logs 等文件，方便 Docker 挂载）
    #[arg(long)]
    data_dir: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("openlib-explorer v{}", VERSION);
        return Ok(());
    }

    let data_dir = cli.data_dir.as_ref().map(std::path::Path::new);

    let mut config = if let Some(dir) = data_dir {
        load_or_create_with_base::<Config>(None, Some(dir)).map_err(|e| anyhow!(e.to_string()))?
    } else {
        load_or_create::<Config>(None).map_err(|e| anyhow!(e.to_string()))?
    };
    if cli.old_cli {
        config.old_cli = true;
    }

    let _log = init_logging(cli.debug, config.old_cli, data_dir)?;
    info!(target: "startup", "当前版本: v{}", VERSION);

    if config.old_cli {
        ui::noui::run(&config)
    } else {
        ui::tui::run(config)
    }
}

fn init_logging(
    debug: bool,
    old_cli: bool,
    base_dir: Option<&std::path::Path>,
) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color: true,
        archive_on_exit: true,
        // TUI 下禁止控制台输出，日志改走界面内广播
        console: old_cli,
        broadcast_to_ui: !old_cli,
    };
    LogSystem::init_with_base(opts, base_dir).map_err(|e| anyhow!(e))
}
