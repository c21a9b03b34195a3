use declarg::clap::value_parser;
use declarg::{convert, ArgSpec, CliSpec};

fn main() {
    // Try: `DEPLOY_TOKEN=abc cargo run --example environment -- --region eu`
    let spec = CliSpec::new("deploy")
        .about("Deploy the service.")
        .envvar_prefix("DEPLOY")
        .arg(
            ArgSpec::new(["--token"])
                .required(true)
                .help("The access token."),
        )
        .arg(
            ArgSpec::new(["-r", "--region"])
                .default_value("us")
                .help("The target region."),
        )
        .arg(
            ArgSpec::new(["--replicas"])
                .value_parser(value_parser!(u16))
                .default_value("2")
                .help("How many replicas to run."),
        )
        .arg(
            ArgSpec::new(["--not-before"])
                .value_parser(convert::iso_datetime)
                .help("Wait until this time (ISO 8601)."),
        );

    let args = spec.parse_args();

    for env_var in spec.env_vars(None).unwrap_or_default() {
        println!("{}: {}", env_var.name(), env_var.value().unwrap_or("<unset>"));
    }

    for (name, value) in spec.name_value_pairs(&args).unwrap_or_default() {
        println!("{name} = {value:?}");
    }
}
