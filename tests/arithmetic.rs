#[macro_use]
mod common;

#[cfg(test)]
mod arithmetic {
    tests! {
        precedence in arithmetic is OK
        "7"
    }
}
