use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("ADMISSION_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("ADMISSION_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("ADMISSION_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("ADMISSION_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("/certs/tls.crt")
            .env("ADMISSION_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS. Leave empty, together with --key-file, to serve plain HTTP"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("/certs/tls.key")
            .env("ADMISSION_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS. Leave empty, together with --cert-file, to serve plain HTTP"),
        Arg::new("liveness-interval")
            .long("liveness-interval")
            .value_name("SECONDS")
            .default_value("60")
            .env("ADMISSION_LIVENESS_INTERVAL")
            .help("Interval between two 'server is running' log messages"),
        Arg::new("ignore-kubernetes-connection-failure")
            .long("ignore-kubernetes-connection-failure")
            .env("ADMISSION_IGNORE_KUBERNETES_CONNECTION_FAILURE")
            .action(ArgAction::SetTrue)
            .help("Do not exit with an error if the Kubernetes connection fails"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
