fn main() {
    if let Err(err) = timetracker_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
