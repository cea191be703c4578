error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    foreign_links {
        Tmpl(tera::Error);
        SerdeJ(serde_json::Error);
        SerdeY(serde_yaml::Error);
    }
    errors {
        /// §7 `render-failed` — includes the undefined-key case (§4.2)
        RenderFailed(tmpl: String, cause: String) {
            description("template render failed")
            display("render of '{}' failed: {}", tmpl, cause)
        }
        /// an include file referenced by name has no entry in the library
        UnknownInclude(name: String) {
            description("unknown include")
            display("include '{}' not found in include library", name)
        }
        /// two include files derived the same registry name
        IncludeCollision(name: String) {
            description("include name collision")
            display("include '{}' is defined by more than one file in include/", name)
        }
    }
}
