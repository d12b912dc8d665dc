fn main() {
    go_driver::cli::run();
}
