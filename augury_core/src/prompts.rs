//! Prompt text for each generator operation.
//!
//! Inputs arrive already serialized to JSON; these functions only arrange
//! them. The response shape itself is enforced by the schema, so the
//! prompts describe fields in prose rather than relying on the model to
//! copy an example.

pub fn actors(situation: &str) -> String {
    format!(
        "List the actors that matter in the situation below. For each actor give a \
name, their goals, and their formal and informal powers. Add any general notes in \
`observations`.\n\nSituation:\n{situation}"
    )
}

pub fn adjust_actors(actors_json: &str, external_info: &str) -> String {
    format!(
        "These are the actors of an ongoing scenario:\n{actors_json}\n\n\
New external information has arrived:\n{external_info}\n\n\
Revise the actors to account for it. You may change goals or powers, add actors, \
or remove actors that no longer matter. Return the complete revised list."
    )
}

pub fn initial_world(situation: &str, actors_json: &str) -> String {
    format!(
        "Situation:\n{situation}\n\nActors:\n{actors_json}\n\n\
Summarize the current state of the world. `events` lists the concrete events and \
facts that hold right now; `description` is an overall account of the state."
    )
}

pub fn observe(world_json: &str, actor_json: &str) -> String {
    format!(
        "Complete world state:\n{world_json}\n\nActor:\n{actor_json}\n\n\
Decide what this actor would realistically know given their position and powers. \
`visible_events` lists only the events the actor actually has access to; leave out \
anything they could not know. `interpretation` explains how the actor reads that \
information in light of their goals."
    )
}

pub fn decide(actor_json: &str, view_json: &str) -> String {
    format!(
        "Actor:\n{actor_json}\n\nWhat the actor knows:\n{view_json}\n\n\
Choose the single action this actor takes now, given their goals, powers and \
knowledge. Return their name in `actor_name`, the action in `action`, and the \
reasoning behind it in `reasoning`."
    )
}

pub fn fold(world_json: &str, actions_json: &str) -> String {
    format!(
        "Current world state:\n{world_json}\n\nActions taken this turn:\n{actions_json}\n\n\
Advance the world state to reflect the consequences of these actions. `events` is \
the updated list of events, including the consequences; `description` is the \
updated overall account."
    )
}

pub fn answer(question: &str, world_json: &str, history_json: &str) -> String {
    format!(
        "Final world state:\n{world_json}\n\n\
Actions taken, turn by turn:\n{history_json}\n\n\
Question: {question}\n\n\
Give a clear, detailed `answer` that cites specific events and actions from the \
simulation, and set `yes_no` to the yes/no answer to the question."
    )
}
