fn main() {
    // Only the ESP-IDF build needs the toolchain environment exported.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
