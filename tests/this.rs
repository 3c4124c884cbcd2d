#[macro_use]
mod common;

#[cfg(test)]
mod this {
    tests! {
        method_reads_instance_state in this is OK
        "The German chocolate cake is delicious!"
    }

    tests! {
        bound_method_outlives_the_get in this is OK
        "Jane"
    }
}
