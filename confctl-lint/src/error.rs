error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    foreign_links {
        SerdeY(serde_yaml::Error);
        Tree(confctl_filetree::Error);
        Psy(confctl_psy::Error);
    }
}
