fn main() {
    poker_analytics::cli::run();
}
