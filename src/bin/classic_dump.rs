use std::path::PathBuf;

use classic_io::Reader;
use env_logger::{Builder, Env};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "classic-dump", about = "List and inspect scans in a CLASSIC file")]
struct Opt {
    /// Path to a CLASSIC (.apex, .class, ...) file
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Print the full header and frequency/sample counts for this scan
    /// (1-based) instead of listing the whole directory
    #[structopt(long)]
    scan: Option<i64>,

    /// Dump the raw words of --scan's observation header record instead
    /// of its decoded header
    #[structopt(long, requires = "scan")]
    dump: bool,
}

fn init_logger() {
    let env = Env::new()
        .filter_or("CLASSIC_LOG_LEVEL", "info")
        .write_style("CLASSIC_LOG_STYLE");
    Builder::from_env(env).init();
}

fn main() -> anyhow::Result<()> {
    init_logger();
    let opt = Opt::from_args();

    let mut reader = Reader::open(&opt.input)?;
    let count = reader.count()?;

    match opt.scan {
        None => {
            for scan in 1..=count {
                let head = reader.header(scan)?;
                println!("{}", head.print_line());
            }
        }
        Some(scan) if opt.dump => {
            print!("{}", reader.dump_obs_record(scan)?);
        }
        Some(scan) => {
            let head = reader.header(scan)?;
            println!("{}", head.print_line());
            let freqs = reader.frequencies(scan)?;
            let samples = reader.samples(scan)?;
            println!("{} channels, {} samples", freqs.len(), samples.len());
        }
    }

    Ok(())
}
