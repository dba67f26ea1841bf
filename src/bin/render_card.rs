//! 本地渲染工具：把一条经文渲染为 PNG 卡片并写入文件。
//!
//! 经文来源：`--record` 指定的本地 JSON（单条记录或记录数组），否则从配置的数据源随机拉取。

use std::fs;
use std::path::{Path, PathBuf};

use ayat_backend::AppConfig;
use ayat_backend::features::ayat::selector::pick_one;
use ayat_backend::features::ayat::{AyatSource, HttpAyatSource, VerseRecord};
use ayat_backend::features::image::CardQuery;
use ayat_backend::startup::run_startup_checks;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args = Args::parse(std::env::args().skip(1).collect());
    if args.help {
        print_help();
        return Ok(());
    }

    AppConfig::init_global()?;
    let config = AppConfig::global();

    let spec = args.query.resolve(&config.image)?;
    let record = match args.record_path.as_deref() {
        Some(path) => read_record(path)?,
        None => {
            let source = HttpAyatSource::from_config(&config.source)?;
            let entries = source.fetch_all().await?;
            let entry = pick_one(entries, &mut rand::thread_rng()).ok_or("数据源返回空集合")?;
            VerseRecord::from_value(entry)?
        }
    };

    let renderer = run_startup_checks(config).await?.into_renderer(config);
    let png = tokio::task::spawn_blocking(move || renderer.render_png(&record, &spec)).await??;

    fs::write(&args.out_path, &png)?;
    println!("已写入: {} ({} bytes)", args.out_path.display(), png.len());
    Ok(())
}

/// 读取本地记录：单条对象直接使用，数组则随机取一条。
fn read_record(path: &Path) -> Result<VerseRecord, Box<dyn std::error::Error>> {
    let raw = fs::read(path)?;
    let value: serde_json::Value = serde_json::from_slice(&raw)?;
    if value.is_array() {
        let records: Vec<VerseRecord> = serde_json::from_value(value)?;
        let record = pick_one(records, &mut rand::thread_rng())
            .ok_or_else(|| format!("{} 中没有记录", path.display()))?;
        Ok(record)
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

struct Args {
    help: bool,
    record_path: Option<PathBuf>,
    query: CardQuery,
    out_path: PathBuf,
}

impl Args {
    fn parse(argv: Vec<String>) -> Self {
        let mut args = Self {
            help: false,
            record_path: None,
            query: CardQuery::default(),
            out_path: PathBuf::from("ayah.png"),
        };

        let mut it = argv.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "-h" | "--help" => args.help = true,
                "--record" => args.record_path = it.next().map(PathBuf::from),
                "--theme" => args.query.theme = it.next(),
                "--type" => args.query.kind = it.next(),
                "--width" => args.query.width = it.next().and_then(|v| v.parse().ok()),
                "--height" => args.query.height = it.next().and_then(|v| v.parse().ok()),
                "--out" => {
                    if let Some(v) = it.next() {
                        args.out_path = PathBuf::from(v);
                    }
                }
                _ => {}
            }
        }
        args
    }
}

fn print_help() {
    println!(
        r#"render_card（本地经文卡片渲染）

用法：
  cargo run --bin render_card -- --theme ocean --type horizontal --out card.png

常用参数：
  --record PATH                 本地 JSON（单条记录或数组）；缺省时从 source.url 随机拉取
  --theme NAME                  dark|light|ocean|forest|sunset|royal|desert（默认 dark）
  --type vertical|horizontal    仅影响默认高度（默认 vertical）
  --width N                     画布宽度（默认 800）
  --height N                    画布高度（默认 500 / 300）
  --out PATH                    输出文件（默认 ayah.png）
  -h, --help                    显示帮助
"#
    );
}
