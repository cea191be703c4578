error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    foreign_links {
        SerdeY(serde_yaml::Error);
        Tree(confctl_filetree::Error);
        Psy(confctl_psy::Error);
        Template(confctl_template::Error);
        Decrypt(confctl_decrypt::Error);
    }
    errors {
        NotFound(path: String) {
            description("mandatory source file is missing")
            display("not-found: {}", path)
        }
    }
}
