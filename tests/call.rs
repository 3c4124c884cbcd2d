#[macro_use]
mod common;

#[cfg(test)]
mod call {
    tests! {
        max_arguments_accepted in call is OK
        "ok"
    }

    tests! {
        too_many_arguments_is_reported in call is ERR 65, "Can't have more than 255 arguments."
    }
}
