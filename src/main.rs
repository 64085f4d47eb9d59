fn main() {
    tinytasks_lib::run()
}
