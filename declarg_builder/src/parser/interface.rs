/// Where the parser writes its help and error messages.
pub(crate) trait UserInterface {
    fn print(&self, message: String);

    fn print_error(&self, error: String);
}

#[derive(Debug, Default)]
pub(crate) struct ConsoleInterface {}

impl UserInterface for ConsoleInterface {
    fn print(&self, message: String) {
        print!("{message}");
    }

    fn print_error(&self, error: String) {
        eprint!("{error}");
    }
}
