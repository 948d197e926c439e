mod artifact;
mod submit;
