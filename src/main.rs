fn main() {
    recast::cli::run();
}
