//! Binary entrypoint for the `selctx` command.

fn main() {
    std::process::exit(selctx_cli::run());
}
