use color_eyre::Result;

/// Run the interpreter.
fn main() -> Result<()> {
    rfinch::run_interpreter()
}
