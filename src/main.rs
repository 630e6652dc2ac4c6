use std::path::Path;
use std::process::exit;

use clap::{crate_version, App, AppSettings, Arg, SubCommand};

use mdpress::config::Config;
use mdpress::metadata::MetadataGenerator;
use mdpress::posts::PostGenerator;
use mdpress::{build, error};

fn main() {
    let matches = App::new("mdpress")
        .version(crate_version!())
        .about("Markdown blog pipeline: metadata index and templated HTML pages")
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("project")
                .long("project")
                .short("p")
                .takes_value(true)
                .default_value(".")
                .help("Project directory; searched upward for config.yaml/config.json"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Generate the metadata index, all pages, and synced static assets"),
        )
        .subcommand(SubCommand::with_name("metadata").about("Generate only the metadata index"))
        .subcommand(SubCommand::with_name("posts").about("Generate only the HTML pages"))
        .get_matches();

    let project = matches.value_of("project").unwrap_or(".");
    let config = match Config::discover(Path::new(project)) {
        Err(err) => {
            error!("{}", err);
            exit(1);
        }
        Ok(config) => config,
    };

    if let Err(err) = run(&config, matches.subcommand_name()) {
        error!("{}", err);
        exit(1);
    }
}

fn run(config: &Config, subcommand: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    match subcommand {
        Some("metadata") => {
            MetadataGenerator::new(config).generate()?;
        }
        Some("posts") => {
            PostGenerator::new(config)?.generate()?;
        }
        // `build` and no subcommand both run the full pipeline.
        _ => {
            build::build_site(config)?;
        }
    }
    Ok(())
}
