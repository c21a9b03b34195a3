use declarg::clap::value_parser;
use declarg::{Action, ArgSpec, CliSpec, Nargs, ParsedArgs, SubcmdGroup, SubcmdSpec};

fn sum(args: &ParsedArgs) -> i32 {
    let items: u32 = args
        .values::<u32>("item")
        .unwrap_or_default()
        .into_iter()
        .sum();

    if args.flag("verbose") {
        println!("Summing {:?}.", args.raw("item").unwrap_or_default());
    }

    println!("Sum: {items}");
    0
}

fn echo(args: &ParsedArgs) -> i32 {
    let message = args
        .values::<String>("word")
        .unwrap_or_default()
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<&str>>()
        .join(" ");

    for _ in 0..*args.value::<u8>("times").unwrap_or(&1) {
        println!("{message}");
    }

    0
}

fn main() {
    let parser = CliSpec::new("calc")
        .about("A small calculator, organized into sub-commands.")
        .version("0.1.0")
        .arg(
            ArgSpec::new(["-v", "--verbose"])
                .action(Action::StoreTrue)
                .help("Explain what is happening."),
        )
        .subcommands(
            SubcmdGroup::new([
                SubcmdSpec::new("sum", sum)
                    .help("Sum the items.")
                    .alias("add")
                    .arg(
                        ArgSpec::new(["item"])
                            .nargs(Nargs::AtLeastOne)
                            .value_parser(value_parser!(u32))
                            .help("The items to sum."),
                    ),
                SubcmdSpec::new("echo", echo)
                    .help("Repeat the words.")
                    .arg(ArgSpec::new(["word"]).nargs(Nargs::Any))
                    .arg(
                        ArgSpec::new(["-t", "--times"])
                            .value_parser(value_parser!(u8))
                            .default_value("1")
                            .help("How many times to repeat (default: 1)"),
                    ),
            ])
            .help("Operations")
            .required(true),
        )
        .build();

    std::process::exit(parser.run());
}
