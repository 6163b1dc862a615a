fn main() -> std::process::ExitCode {
    shoppulse_lib::run()
}
