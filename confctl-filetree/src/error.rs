error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    foreign_links {
        Io(::std::io::Error);
        Walk(::walkdir::Error);
    }
    errors {
        NotFound(path: String) {
            description("no such file in tree")
            display("no such file in tree: {}", path)
        }
        NotUtf8(path: String) {
            description("file is not valid UTF-8")
            display("file is not valid UTF-8: {}", path)
        }
    }
}
