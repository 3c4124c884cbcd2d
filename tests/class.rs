#[macro_use]
mod common;

#[cfg(test)]
mod class {
    tests! {
        super_dispatch in class is OK
        "A"
        "B"
    }
}
