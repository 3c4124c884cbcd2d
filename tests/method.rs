#[macro_use]
mod common;

#[cfg(test)]
mod method {
    tests! {
        call_with_arguments in method is OK
        "scone with berries and cream"
    }
}
