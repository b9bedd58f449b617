fn main() {
    pyrite::main()
}
