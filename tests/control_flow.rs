#[macro_use]
mod common;

#[cfg(test)]
mod control_flow {
    tests! {
        block_shadowing in control_flow is OK
        "inner"
        "outer"
    }
}
