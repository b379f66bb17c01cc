fn main() {
    corvid::board::init();
    corvid::uci::run();
}
