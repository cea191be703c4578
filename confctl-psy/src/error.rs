error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    foreign_links {
        SerdeY(serde_yaml::Error);
    }
    errors {
        /// §7 `not-found` — path absent entirely (no such key/index anywhere in the tree)
        PathNotFound(path: String) {
            description("path not found")
            display("path '{}' not found", path)
        }
        /// §7 `patch-path-missing` — patch references a path absent in the base
        PatchPathMissing(path: String) {
            description("patch references a path missing in the base document")
            display("patch path '{}' missing in base", path)
        }
        /// §7 `wrong-type` — typed conversion rejected (e.g. setting through a non-leaf)
        WrongType(path: String) {
            description("path does not resolve to a scalar")
            display("path '{}' does not resolve to a scalar leaf", path)
        }
    }
}
