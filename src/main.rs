mod cli;

use clap::Parser;
use cli::{Cli, OutputFormat};
use encoding_does_support::{
    does_support, CharacterSpecifier, FcFontIndex, FcGlyphChecker, FcIndexConfig, Result,
};
use log::LevelFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("encoding-does-support: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG takes precedence over -v
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let index = FcFontIndex::new(FcIndexConfig {
        fonts_conf: cli.fonts_conf,
        extra_dirs: cli.font_dirs,
    });
    let mut checker = FcGlyphChecker::new();

    let chars = cli
        .chars
        .into_iter()
        .map(CharacterSpecifier::from_os_arg)
        .collect::<Vec<_>>();

    let res = does_support(&cli.encoding, &cli.font_pattern, &chars, &index, &mut checker)?;

    match cli.format {
        OutputFormat::Vim => println!("{}", res.to_vim()),
        OutputFormat::Json => println!("{}", res.to_json()?),
    }
    Ok(())
}
