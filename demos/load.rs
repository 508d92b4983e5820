use luaconfig::{
    lua_enum, lua_record, Catalog, DecodeError, Decoded, FieldSpec, FormatValue, LoaderSettings,
    LuaRecord, LuaRuntime, RecordMeta, Registry, Settings,
};

#[derive(Debug, Default, Clone, Copy)]
enum Mode {
    #[default]
    Standalone,
    Cluster,
}

lua_enum!(Mode { Standalone, Cluster });

#[derive(Debug, Default)]
struct Upstream {
    host: String,
    weight: i32,
}

impl LuaRecord for Upstream {
    fn meta() -> RecordMeta {
        RecordMeta::new().nested().optional()
    }

    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::new::<String>("host").required(), FieldSpec::new::<i32>("weight")]
    }

    fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
        match name {
            "host" => self.host = value.lift()?,
            "weight" => self.weight = value.lift()?,
            _ => {}
        }
        Ok(())
    }

    fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
        vec![("host", &self.host), ("weight", &self.weight)]
    }
}

lua_record!(Upstream);

#[derive(Debug, Default)]
struct ServerConfig {
    name: String,
    port: i32,
    mode: Mode,
    upstreams: Vec<Upstream>,
}

impl LuaRecord for ServerConfig {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new::<String>("name"),
            FieldSpec::new::<i32>("port"),
            FieldSpec::new::<Mode>("mode").optional(),
            FieldSpec::new::<Vec<Upstream>>("upstreams"),
        ]
    }

    fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
        match name {
            "name" => self.name = value.lift()?,
            "port" => self.port = value.lift()?,
            "mode" => self.mode = value.lift()?,
            "upstreams" => self.upstreams = value.lift()?,
            _ => {}
        }
        Ok(())
    }

    fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
        vec![
            ("name", &self.name),
            ("port", &self.port),
            ("mode", &self.mode),
            ("upstreams", &self.upstreams),
        ]
    }

    fn after_load(&mut self) -> Result<(), DecodeError> {
        if self.upstreams.is_empty() {
            return Err(DecodeError::custom("at least one upstream is required"));
        }
        Ok(())
    }
}

lua_record!(ServerConfig);

fn main() -> Result<(), luaconfig::Error> {
    // LUACONFIG__ROOT_PATH / LUACONFIG__NAMESPACES override the file
    let settings: LoaderSettings = Settings::builder()
        .with_file("demos/luaconfig.toml", true)
        .with_env("LUACONFIG", "__")
        .build()?;

    let catalog = Catalog::new()
        .register::<ServerConfig>("server")
        .register::<Upstream>("server");
    let mut registry = Registry::new(LuaRuntime::new(), catalog);
    if !registry.load_with(&settings) {
        eprintln!("config load failed under {}", settings.root_path.display());
        std::process::exit(1);
    }

    if luaconfig::install(registry).is_err() {
        eprintln!("config registry already installed");
        std::process::exit(1);
    }

    if let Some(server) = luaconfig::global().and_then(|r| r.get::<ServerConfig>()) {
        println!("{}", luaconfig::display(&*server));
        println!("{} listens on {} ({} upstreams)", server.name, server.port, server.upstreams.len());
    }

    Ok(())
}
