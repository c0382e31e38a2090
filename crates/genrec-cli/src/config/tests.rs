#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.store.backend, StoreBackend::Fixture);
        assert_eq!(config.store.fixture_path, PathBuf::from("./genrec-data.yaml"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_postgres_backend() {
        let config = Config::parse(
            r#"
            [store]
            backend = "postgres"
            url = "postgres://genrec@localhost/genrec"

            [output]
            format = "text"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.url.as_deref(), Some("postgres://genrec@localhost/genrec"));
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Config::parse("[store]\nbackend = \"sqlite\"\n").is_err());
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/genrec.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
