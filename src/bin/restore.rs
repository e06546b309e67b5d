use std::env;

use libtrash::{Trashcan, TrashOptions};

const EXITCODE_OK: i32 = 0;
const EXITCODE_INVALID_ARGS: i32 = 1;
const EXITCODE_EXTERNAL: i32 = 255;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        std::process::exit(EXITCODE_INVALID_ARGS);
    };

    let trashcan = match Trashcan::new(TrashOptions::default()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("restore: cannot open trash: {e}");
            std::process::exit(EXITCODE_EXTERNAL);
        }
    };

    match command.as_str() {
        "list" => list(&trashcan),
        "restore" => act(&trashcan, args.get(1), Action::Restore),
        "erase" => act(&trashcan, args.get(1), Action::Erase),
        "-h" | "--help" => {
            print_usage();
            std::process::exit(EXITCODE_OK);
        }
        other => {
            eprintln!("restore: unsupported command: {other}");
            print_usage();
            std::process::exit(EXITCODE_INVALID_ARGS);
        }
    }
}

fn print_usage() {
    eprintln!(
        "\
Usage: restore list
       restore restore <substring>
       restore erase <substring>

list             show every trashed item and its original location
restore <text>   restore the first item whose original path contains <text>
erase <text>     permanently erase the first item whose original path contains <text>"
    );
}

fn list(trashcan: &Trashcan) {
    let mut found = false;
    for item in trashcan.by_item() {
        found = true;
        let when = item.deletion_date.map(|d| d.to_string()).unwrap_or_else(|| "unknown".to_string());
        println!("{}\t{}", when, item.restore_path.display());
    }
    if !found {
        println!("trash is empty");
    }
}

enum Action {
    Restore,
    Erase,
}

fn act(trashcan: &Trashcan, needle: Option<&String>, action: Action) {
    let Some(needle) = needle else {
        eprintln!("restore: missing operand");
        print_usage();
        std::process::exit(EXITCODE_INVALID_ARGS);
    };

    let matched = trashcan.by_item().find(|item| item.restore_path.to_string_lossy().contains(needle.as_str()));

    let Some(item) = matched else {
        eprintln!("restore: no trashed item matches '{needle}'");
        std::process::exit(EXITCODE_INVALID_ARGS);
    };

    let result = match action {
        Action::Restore => trashcan.restore(&item),
        Action::Erase => trashcan.erase(&item),
    };

    if let Err(e) = result {
        eprintln!("restore: {e}");
        std::process::exit(EXITCODE_EXTERNAL);
    }
}
