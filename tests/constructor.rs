#[macro_use]
mod common;

#[cfg(test)]
mod constructor {
    tests! {
        initializer_sets_fields in constructor is OK
        "value"
    }

    tests! {
        early_return_still_yields_this in constructor is OK
        "1"
    }
}
