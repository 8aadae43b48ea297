fn main() {
    if let Err(err) = curve_labels::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
