fn main() {
    if !std::path::Path::new("cfg.toml").exists() {
        panic!("cfg.toml is missing, copy cfg.toml.example and fill in the wifi credentials");
    }

    embuild::espidf::sysenv::output();
}
