// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common shape of the FILE-valued output options
fn file_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).value_name("FILE").help(help)
}

fn build_cli() -> Command {
    Command::new("gendepslist")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Conary Contributors")
        .about("Compute package dependency lists and install order")
        .arg(
            file_arg("output", "Write the depslist to FILE and the ordered depslist to FILE.ordered")
                .short('o'),
        )
        .arg(file_arg("html", "Write an HTML dependency report"))
        .arg(file_arg("leaves", "Write the packages nothing depends on"))
        .arg(file_arg("config", "Configuration file (TOML)").short('c'))
        .arg(
            Arg::new("policy")
                .long("policy")
                .value_parser(["batch-sequential", "global-priority"])
                .help("Scheduling policy"),
        )
        .arg(
            Arg::new("max_unresolved")
                .long("max-unresolved")
                .value_name("N")
                .help("Abort after this many unresolved requirements (0 disables)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("More logging (repeat for trace)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only log warnings and errors"),
        )
        .arg(
            Arg::new("inputs")
                .required(true)
                .num_args(1..)
                .value_name("INPUT")
                .help("RPM files, directories of RPM files or TOML catalogs; each one is a batch"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("gendepslist.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
