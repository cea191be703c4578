#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;
extern crate loggerv;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::process;

use confctl::error::Error;
use confctl::{generate, lint, reconcile};

fn print_error_debug(e: &Error) {
    for cause in e.iter().skip(1) {
        warn!("caused by: {}", cause);
    }
}

fn main() {
    let app = App::new("confctl")
        .version(crate_version!())
        .setting(AppSettings::VersionlessSubcommands)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::ColoredHelp)
        .about("Materializes layered configuration into Kubernetes objects")
        .arg(Arg::with_name("verbose").short("v").multiple(true).help("Increase verbosity"))
        .subcommand(
            SubCommand::with_name("generate")
                .about("Render the configmap/secret values for one installation/app pair")
                .arg(Arg::with_name("dir").long("dir").takes_value(true).required(true).help("Path to a checked-out configuration tree"))
                .arg(Arg::with_name("installation").long("installation").takes_value(true).required(true))
                .arg(Arg::with_name("app").long("app").takes_value(true).required(true))
                .arg(Arg::with_name("vault-transit-key").long("vault-transit-key").takes_value(true).help("Decrypt ciphertext leaves via this Vault transit key")),
        )
        .subcommand(
            SubCommand::with_name("lint")
                .about("Walk a configuration tree and report cross-reference problems")
                .arg(Arg::with_name("dir").long("dir").takes_value(true).required(true))
                .arg(Arg::with_name("rule").long("rule").takes_value(true).help("Only run rules matching this regex"))
                .arg(Arg::with_name("errors-only").long("errors-only"))
                .arg(Arg::with_name("max-messages").long("max-messages").takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("reconcile")
                .about("Run the controller loop against the current kube context")
                .arg(Arg::with_name("host").long("host").takes_value(true).default_value("github.com"))
                .arg(Arg::with_name("owner").long("owner").takes_value(true).required(true))
                .arg(Arg::with_name("repo").long("repo").takes_value(true).required(true))
                .arg(Arg::with_name("ref").long("ref").takes_value(true).default_value("main"))
                .arg(Arg::with_name("shared-owner").long("shared-owner").takes_value(true))
                .arg(Arg::with_name("shared-repo").long("shared-repo").takes_value(true))
                .arg(Arg::with_name("shared-ref").long("shared-ref").takes_value(true).default_value("main"))
                .arg(Arg::with_name("token-env").long("token-env").takes_value(true))
                .arg(Arg::with_name("ssh-key-env").long("ssh-key-env").takes_value(true))
                .arg(Arg::with_name("scratch-dir").long("scratch-dir").takes_value(true).default_value("/tmp/confctl"))
                .arg(Arg::with_name("cache-ttl-secs").long("cache-ttl-secs").takes_value(true).default_value("300"))
                .arg(Arg::with_name("vault-transit-key").long("vault-transit-key").takes_value(true))
                .arg(Arg::with_name("hash-annotation-key").long("hash-annotation-key").takes_value(true).default_value("confctl.example.com/content-hash")),
        );

    let args = app.get_matches();
    let name = args.subcommand_name().unwrap_or("confctl");

    loggerv::Logger::new()
        .verbosity(args.occurrences_of("verbose") + 1)
        .module_path(true)
        .init()
        .unwrap();

    if let Err(e) = dispatch(&args) {
        error!("{} error: {}", name, e);
        print_error_debug(&e);
        process::exit(1);
    }
}

fn dispatch(args: &ArgMatches) -> confctl::Result<()> {
    if let Some(a) = args.subcommand_matches("generate") {
        let opts = generate::GenerateOptions {
            dir: a.value_of("dir").unwrap().to_string(),
            installation: a.value_of("installation").unwrap().to_string(),
            app: a.value_of("app").unwrap().to_string(),
            vault_transit_key: a.value_of("vault-transit-key").map(String::from),
        };
        return generate::run(&opts);
    }

    if let Some(a) = args.subcommand_matches("lint") {
        let opts = lint::RunOptions {
            dir: a.value_of("dir").unwrap().to_string(),
            rule_filter: a.value_of("rule").map(String::from),
            errors_only: a.is_present("errors-only"),
            max_messages: a.value_of("max-messages").and_then(|v| v.parse().ok()),
        };
        let (_, has_errors) = lint::run(&opts)?;
        if has_errors {
            process::exit(2);
        }
        return Ok(());
    }

    if let Some(a) = args.subcommand_matches("reconcile") {
        let opts = reconcile::ReconcileOptions {
            host: a.value_of("host").unwrap().to_string(),
            owner: a.value_of("owner").unwrap().to_string(),
            name: a.value_of("repo").unwrap().to_string(),
            reference: a.value_of("ref").unwrap().to_string(),
            shared_owner: a.value_of("shared-owner").map(String::from),
            shared_name: a.value_of("shared-repo").map(String::from),
            shared_reference: a.value_of("shared-ref").map(String::from),
            token_env: a.value_of("token-env").map(String::from),
            ssh_key_env: a.value_of("ssh-key-env").map(String::from),
            scratch_dir: a.value_of("scratch-dir").unwrap().into(),
            cache_ttl_secs: a.value_of("cache-ttl-secs").unwrap().parse().unwrap_or(300),
            vault_transit_key: a.value_of("vault-transit-key").map(String::from),
            hash_annotation_key: a.value_of("hash-annotation-key").unwrap().to_string(),
        };

        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(reconcile::run(opts));
    }

    unreachable!("subcommand required")
}
