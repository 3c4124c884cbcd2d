#[macro_use]
mod common;

#[cfg(test)]
mod builtin {
    tests! {
        clock_is_nonnegative in builtin is OK
        "true"
    }
}
