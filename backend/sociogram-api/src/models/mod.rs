pub mod post;
pub mod requests;
pub mod user;

pub use post::{Comment, CommentView, LikeTransition, NewPost, Post, PostView};
pub use requests::*;
pub use user::{Account, AuthorSummary, NewUser, ProfileChanges, User, UserProfile};
