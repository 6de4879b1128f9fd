fn main() {
    equimine::main();
}
