#[macro_export]
macro_rules! env_var {
    ($name:ident) => {
        const $name: &'static str = stringify!($name);
    };
}

/// Load a required env var into a validated newtype; the enclosing function
/// must return `anyhow::Result` and have `anyhow::Context` in scope.
#[macro_export]
macro_rules! env_load {
    ($type:ident, $name:ident) => {
        $type::try_new(
            std::env::var($name)
                .with_context(|| format!("Missing {} env var", $name))?,
        )
        .with_context(|| format!("{} was not formatted right", $name))?
    };
    ($type:ident, $name:ident, $type_raw:ident) => {
        $type::try_new(
            std::env::var($name)
                .with_context(|| format!("Missing {} env var", $name))?
                .parse::<$type_raw>()
                .with_context(|| {
                    format!(
                        "{} env var cannot be parsed in the correct type",
                        $name
                    )
                })?,
        )
        .with_context(|| format!("{} was not formatted right", $name))?
    };
}

/// Same as [`env_load!`](crate::env_load) for an optional env var: absent
/// means `None`, present-but-malformed is still an error.
#[macro_export]
macro_rules! env_load_opt {
    ($type:ident, $name:ident) => {
        match std::env::var($name) {
            Ok(raw) => Some($type::try_new(raw).with_context(|| {
                format!("{} was not formatted right", $name)
            })?),
            Err(_) => None,
        }
    };
}
