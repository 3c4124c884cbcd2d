#[macro_use]
mod common;

#[cfg(test)]
mod string {
    tests! {
        concatenation in string is OK
        "foobar"
    }
}
