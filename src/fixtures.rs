#[cfg(test)]
pub mod test {
    use std::path::Path;

    use crate::guard::GuardRegistry;
    use crate::schema::Schema;

    pub const SERVER_SCHEMA: &str = r#"
[port]
type = "Int"
default = 80
doc = "Port the server listens on."
guards = [{ message = "port must be at least 80", callable = "at_least_80" }]

[nums]
type = "List[Int]"
default = "1,2,3"
doc = "Lucky numbers, in order."

[host]
type = "String"
default = "localhost"
doc = "Host name to bind."

[debug]
type = "Bool"
default = "False"
doc = "Enable debug output."

[backup]
type = "Optional[String]"
default = "None"
doc = "Address of the backup server, if any."
"#;

    pub fn registry() -> GuardRegistry {
        let mut registry = GuardRegistry::new();
        registry.register("at_least_80", |v| v.as_i64().is_some_and(|p| p >= 80));
        registry
    }

    pub fn server_schema() -> Schema {
        Schema::from_toml(SERVER_SCHEMA, Path::new("schema.toml"), &registry()).unwrap()
    }

    #[test]
    fn server_schema_loads() {
        let schema = server_schema();
        assert_eq!(schema.len(), 5);
        assert!(schema.contains("port"));
        assert_eq!(schema.get("port").unwrap().guards().len(), 1);
    }
}
