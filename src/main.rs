fn main() {
    if let Err(err) = label_layout::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
